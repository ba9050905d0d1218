//! External resources referenced from markup as `prefix:payload{props}`.
//!
//! The literal evaluator parses the reference into a [`ResourceSpec`] and
//! hands it to the [`ResourceResolver`] registered for the prefix in the
//! [`Environment`](crate::env::Environment).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::BindingError;
use crate::value::Value;

/// A parsed resource reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    pub prefix: String,
    pub payload: String,
    pub props: BTreeMap<String, Value>,
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.payload)?;
        if !self.props.is_empty() {
            let props: Vec<String> = self.props.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "{{{}}}", props.join(","))?;
        }
        Ok(())
    }
}

/// A resolved resource. [`get`](Resource::get) produces the value handed to
/// the backend.
pub trait Resource {
    fn spec(&self) -> &ResourceSpec;
    fn get(&self) -> Result<Value, BindingError>;
}

impl fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.spec())
    }
}

pub trait ResourceResolver {
    fn resolve(&self, spec: &ResourceSpec) -> Result<Rc<dyn Resource>, BindingError>;
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Extension appended to image payloads that have none.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Resolves `img:name` to a file inside a media directory.
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    media_dir: Option<PathBuf>,
}

impl ImageResolver {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: Some(media_dir.into()),
        }
    }
}

impl ResourceResolver for ImageResolver {
    fn resolve(&self, spec: &ResourceSpec) -> Result<Rc<dyn Resource>, BindingError> {
        let Some(dir) = &self.media_dir else {
            return Err(BindingError::Resource("media directory not set".into()));
        };
        let mut file = spec.payload.clone();
        if !file.contains('.') {
            file.push('.');
            file.push_str(DEFAULT_IMAGE_EXTENSION);
        }
        Ok(Rc::new(Image {
            spec: spec.clone(),
            path: dir.join(file),
        }))
    }
}

/// An image file. Decoding is left to the backend, which receives the path.
#[derive(Debug)]
pub struct Image {
    spec: ResourceSpec,
    path: PathBuf,
}

impl Resource for Image {
    fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    fn get(&self) -> Result<Value, BindingError> {
        Ok(Value::Path(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(payload: &str) -> ResourceSpec {
        ResourceSpec {
            prefix: "img".into(),
            payload: payload.into(),
            props: BTreeMap::new(),
        }
    }

    #[test]
    fn test_image_gets_default_extension() {
        let resolver = ImageResolver::new("/media");
        let res = resolver.resolve(&spec("logo")).unwrap();
        assert_eq!(res.get().unwrap(), Value::Path("/media/logo.png".into()));
        let res = resolver.resolve(&spec("photo.jpg")).unwrap();
        assert_eq!(res.get().unwrap(), Value::Path("/media/photo.jpg".into()));
    }

    #[test]
    fn test_missing_media_dir() {
        let err = ImageResolver::default().resolve(&spec("logo")).unwrap_err();
        assert!(matches!(err, BindingError::Resource(_)));
    }

    #[test]
    fn test_spec_display() {
        let mut s = spec("logo");
        s.props.insert("width".into(), Value::Int(32));
        assert_eq!(s.to_string(), "img:logo{width=32}");
    }
}
