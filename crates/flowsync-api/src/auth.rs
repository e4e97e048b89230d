use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString, VariantNames};

/// HTTP Basic credentials for the controller's northbound API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Apply Basic auth to a request.
    pub(crate) fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}

/// Supported controller release families.
///
/// All three expose the same RESTCONF inventory and topology paths; the
/// version only gates construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ControllerVersion {
    Beryllium,
    Boron,
    Carbon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_case_insensitively() {
        assert_eq!("BORON".parse::<ControllerVersion>().ok(), Some(ControllerVersion::Boron));
        assert_eq!("carbon".parse::<ControllerVersion>().ok(), Some(ControllerVersion::Carbon));
    }

    #[test]
    fn version_rejects_unknown_release() {
        assert!("NITROGEN".parse::<ControllerVersion>().is_err());
    }

    #[test]
    fn version_displays_uppercase() {
        assert_eq!(ControllerVersion::Beryllium.to_string(), "BERYLLIUM");
        assert_eq!(ControllerVersion::VARIANTS, ["BERYLLIUM", "BORON", "CARBON"]);
    }
}
