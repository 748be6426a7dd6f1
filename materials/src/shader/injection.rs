//! Injection point maps and source splicing.

use super::ShaderStage;

/// Code fragments one plugin contributes to one stage, keyed by injection point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomCode {
    points: Vec<(String, String)>,
}

impl CustomCode {
    /// Create an empty contribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add code at `point`, appending to code already added there.
    #[must_use]
    pub fn with_code(mut self, point: impl Into<String>, code: impl Into<String>) -> Self {
        self.append(&point.into(), &code.into());
        self
    }

    /// Append code at `point`. Fragments for the same point are joined by `\n`.
    pub fn append(&mut self, point: &str, code: &str) {
        match self.points.iter_mut().find(|(p, _)| p == point) {
            Some((_, existing)) => {
                existing.push('\n');
                existing.push_str(code);
            }
            None => self.points.push((point.to_string(), code.to_string())),
        }
    }

    /// Code at `point`.
    pub fn get(&self, point: &str) -> Option<&str> {
        self.points
            .iter()
            .find(|(p, _)| p == point)
            .map(|(_, c)| c.as_str())
    }

    /// Iterate `(point, code)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.points.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing was contributed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Merged custom code of every plugin on a material, per stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeInjectionPoints {
    vertex: CustomCode,
    fragment: CustomCode,
}

impl CodeInjectionPoints {
    /// Create empty maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one plugin's contribution to `stage`.
    pub fn merge(&mut self, stage: ShaderStage, code: &CustomCode) {
        let target = self.stage_mut(stage);
        for (point, fragment) in code.iter() {
            target.append(point, fragment);
        }
    }

    /// Append a single fragment to `stage`.
    pub fn append(&mut self, stage: ShaderStage, point: &str, code: &str) {
        self.stage_mut(stage).append(point, code);
    }

    /// Merged code for `stage`.
    pub fn stage(&self, stage: ShaderStage) -> &CustomCode {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut CustomCode {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }

    /// Whether neither stage received code.
    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.fragment.is_empty()
    }

    /// Splice the merged code of `stage` into `source`.
    ///
    /// Every line consisting of `#define <POINT>` for a point with merged
    /// code is replaced by that code. Markers without code are left in place
    /// so the template still preprocesses.
    pub fn inject(&self, stage: ShaderStage, source: &str) -> String {
        let code = self.stage(stage);
        let mut result = String::with_capacity(source.len());

        for line in source.lines() {
            match parse_define_directive(line.trim()).and_then(|point| code.get(point)) {
                Some(fragment) => result.push_str(fragment),
                None => result.push_str(line),
            }
            result.push('\n');
        }

        result
    }
}

/// Parse a bare `#define NAME` directive, returning the name.
fn parse_define_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#define")?;
    let name = rest.trim();
    let single_word = !name.is_empty() && !name.contains(char::is_whitespace);
    if rest.starts_with(char::is_whitespace) && single_word {
        Some(name)
    } else {
        None
    }
}
