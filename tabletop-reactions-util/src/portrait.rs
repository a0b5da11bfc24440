use std::path::PathBuf;
use url::Url;

/// What a portrait reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Portrait {
    /// Local image file.
    File(PathBuf),
    /// Remote image.
    Remote(Url),
    /// Asset path or identifier resolved by the host, e.g. `tokens/rogue.webp`.
    Asset(String),
    /// No portrait was sent.
    None,
}

impl Portrait {
    /// Classify an opaque portrait reference.
    pub fn from_ref(reference: &str) -> Self {
        let reference = reference.trim();
        if reference.is_empty() {
            return Portrait::None;
        }

        if let Ok(url) = Url::parse(reference) {
            match url.scheme() {
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Portrait::File(path);
                    }
                }
                "http" | "https" => return Portrait::Remote(url),
                _ => {}
            }
        }

        if reference.starts_with('/') {
            Portrait::File(PathBuf::from(reference))
        } else {
            Portrait::Asset(reference.to_string())
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Portrait::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        assert_eq!(
            Portrait::from_ref("file:///srv/tokens/rogue.png"),
            Portrait::File(PathBuf::from("/srv/tokens/rogue.png"))
        );
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(
            Portrait::from_ref("/srv/tokens/rogue.png"),
            Portrait::File(PathBuf::from("/srv/tokens/rogue.png"))
        );
    }

    #[test]
    fn test_remote_url() {
        let portrait = Portrait::from_ref("https://cdn.example.com/rogue.webp");
        assert!(matches!(portrait, Portrait::Remote(ref url) if url.host_str() == Some("cdn.example.com")));
    }

    #[test]
    fn test_asset_and_unknown_schemes() {
        assert_eq!(
            Portrait::from_ref("tokens/rogue.webp"),
            Portrait::Asset("tokens/rogue.webp".to_string())
        );
        assert_eq!(
            Portrait::from_ref("javascript:alert(1)"),
            Portrait::Asset("javascript:alert(1)".to_string())
        );
    }

    #[test]
    fn test_empty_reference() {
        assert!(Portrait::from_ref("   ").is_none());
    }
}
