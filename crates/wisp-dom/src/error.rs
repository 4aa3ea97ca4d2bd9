//! DOM Errors
//!
//! Every fallible DOM operation returns [`DomResult`]. Each variant except
//! [`DomError::OutOfResources`] maps onto a DOM exception name that a script
//! binding can surface unchanged.

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Insertion would produce an invalid tree shape
    #[error("HierarchyRequestError: {0}")]
    HierarchyRequest(&'static str),

    /// Referenced node is not where the operation expects it
    #[error("NotFoundError: {0}")]
    NotFound(&'static str),

    /// Offset or index past the end of a node or list
    #[error("IndexSizeError: offset {offset} exceeds length {length}")]
    IndexSize { offset: usize, length: usize },

    /// Name or token contains a character that is not allowed
    #[error("InvalidCharacterError: {0:?} contains an invalid character")]
    InvalidCharacter(String),

    /// Malformed selector or token
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Operation or input format not supported
    #[error("NotSupportedError: {0}")]
    NotSupported(String),

    /// Object is in the wrong state for the operation
    #[error("InvalidStateError: {0}")]
    InvalidState(&'static str),

    /// Node type not accepted by the operation
    #[error("InvalidNodeTypeError: {0}")]
    InvalidNodeType(&'static str),

    /// Nodes belong to different trees
    #[error("WrongDocumentError: {0}")]
    WrongDocument(&'static str),

    /// Abort signal fired
    #[error("AbortError: {0}")]
    Abort(String),

    /// Abort signal fired by timeout
    #[error("TimeoutError: signal timed out")]
    Timeout,

    /// Storage exhausted. Distinct from every DOM exception.
    #[error("out of resources: {0}")]
    OutOfResources(&'static str),
}

impl DomError {
    /// DOM exception name, or `None` for resource exhaustion
    pub fn exception_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::HierarchyRequest(_) => "HierarchyRequestError",
            Self::NotFound(_) => "NotFoundError",
            Self::IndexSize { .. } => "IndexSizeError",
            Self::InvalidCharacter(_) => "InvalidCharacterError",
            Self::Syntax(_) => "SyntaxError",
            Self::NotSupported(_) => "NotSupportedError",
            Self::InvalidState(_) => "InvalidStateError",
            Self::InvalidNodeType(_) => "InvalidNodeTypeError",
            Self::WrongDocument(_) => "WrongDocumentError",
            Self::Abort(_) => "AbortError",
            Self::Timeout => "TimeoutError",
            Self::OutOfResources(_) => return None,
        })
    }

    /// Whether this is a resource failure rather than a DOM exception
    #[inline]
    pub fn is_out_of_resources(&self) -> bool {
        matches!(self, Self::OutOfResources(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_names() {
        assert_eq!(
            DomError::HierarchyRequest("cycle").exception_name(),
            Some("HierarchyRequestError")
        );
        assert_eq!(
            DomError::IndexSize { offset: 4, length: 2 }.exception_name(),
            Some("IndexSizeError")
        );
        assert_eq!(DomError::Timeout.exception_name(), Some("TimeoutError"));
    }

    #[test]
    fn test_out_of_resources_is_not_an_exception() {
        let err = DomError::OutOfResources("node arena exhausted");
        assert!(err.is_out_of_resources());
        assert_eq!(err.exception_name(), None);
    }

    #[test]
    fn test_display() {
        let err = DomError::IndexSize { offset: 9, length: 3 };
        assert_eq!(err.to_string(), "IndexSizeError: offset 9 exceeds length 3");
    }
}
