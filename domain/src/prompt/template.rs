//! Task templates with named `{placeholder}` slots.
//!
//! `{{` and `}}` render as literal braces. Anything else inside braces must be
//! an identifier made of ASCII letters, digits and underscores.

use super::inputs::TaskInputs;
use super::schema::OutputSchema;
use crate::core::error::DomainError;

/// A static prompt template plus an optional output schema.
#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub name: &'static str,
    pub description: &'static str,
    pub template: &'static str,
    pub schema: Option<OutputSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Placeholder(&'static str),
}

impl Task {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        template: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            template,
            schema: None,
        }
    }

    pub const fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn is_structured(&self) -> bool {
        self.schema.is_some()
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn required_inputs(&self) -> Result<Vec<&'static str>, DomainError> {
        let mut names = Vec::new();
        for segment in self.segments()? {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Required placeholders that `inputs` does not provide.
    pub fn missing_inputs(&self, inputs: &TaskInputs) -> Result<Vec<String>, DomainError> {
        Ok(self
            .required_inputs()?
            .into_iter()
            .filter(|name| !inputs.contains(name))
            .map(str::to_string)
            .collect())
    }

    /// Substitute every placeholder.
    ///
    /// Fails with [`DomainError::MissingInputs`] listing all absent keys, or
    /// [`DomainError::TemplateFormat`] when the template itself is malformed.
    pub fn render(&self, inputs: &TaskInputs) -> Result<String, DomainError> {
        let segments = self.segments()?;

        let missing = self.missing_inputs(inputs)?;
        if !missing.is_empty() {
            return Err(DomainError::MissingInputs(missing));
        }

        let mut out = String::with_capacity(self.template.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(inputs.get(name).unwrap_or_default()),
            }
        }
        Ok(out)
    }

    fn segments(&self) -> Result<Vec<Segment>, DomainError> {
        scan(self.template).map_err(|reason| DomainError::TemplateFormat {
            task: self.name.to_string(),
            reason,
        })
    }
}

fn scan(template: &'static str) -> Result<Vec<Segment>, String> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                segments.push(Segment::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                let rest = &template[i + 1..];
                let close = rest
                    .find('}')
                    .ok_or_else(|| format!("unclosed '{{' at byte {i}"))?;
                let name = &rest[..close];
                if !is_identifier(name) {
                    return Err(format!("invalid placeholder '{{{name}}}' at byte {i}"));
                }
                segments.push(Segment::Literal(&template[literal_start..i]));
                segments.push(Segment::Placeholder(name));
                i += close + 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                segments.push(Segment::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'}' => return Err(format!("unmatched '}}' at byte {i}")),
            _ => i += 1,
        }
    }

    segments.push(Segment::Literal(&template[literal_start..]));
    segments.retain(|s| !matches!(s, Segment::Literal("")));
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
