use std::fmt;

/// Separates a middleware name from its parameters
pub const PARAMETER_SEPARATOR: char = ':';

/// A middleware descriptor (`name` or `name:param1,param2`) split into its parts.
///
/// Parsing never fails: a trailing colon yields a single empty parameter and an
/// empty name is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedMiddleware {
    name: String,
    parameters: Vec<String>,
    signature: String,
}

impl ParsedMiddleware {
    pub fn parse(descriptor: &str) -> Self {
        let (name, parameters) = match descriptor.split_once(PARAMETER_SEPARATOR) {
            Some((name, parameters)) => (
                name.to_string(),
                parameters.split(',').map(str::to_string).collect(),
            ),
            None => (descriptor.to_string(), Vec::new()),
        };

        Self {
            name,
            parameters,
            signature: descriptor.to_string(),
        }
    }

    /// Portion before the first `:`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Deduplication key: the name plus its parameters
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}

impl fmt::Display for ParsedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

/// Append parameters carried over from an alias or group reference
pub(crate) fn with_parameters(descriptor: &str, parameters: &[String]) -> String {
    if parameters.is_empty() {
        descriptor.to_string()
    } else {
        format!("{}{}{}", descriptor, PARAMETER_SEPARATOR, parameters.join(","))
    }
}
