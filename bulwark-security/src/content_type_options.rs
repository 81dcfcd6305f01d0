//! X-Content-Type-Options

use crate::headers::SecurityHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTypeOptions {
    /// Never sniff away from the declared `Content-Type`
    #[default]
    NoSniff,
}

impl SecurityHeader for ContentTypeOptions {
    const NAME: &'static str = "X-Content-Type-Options";

    fn header_value(&self) -> String {
        match self {
            Self::NoSniff => "nosniff".to_string(),
        }
    }
}
