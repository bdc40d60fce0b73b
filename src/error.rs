/// The classification of an engine error, mirroring the native error
/// constructors a script would observe.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum JSErrorKind {
    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("Uncaught {0}")]
    Throw(String),
}

#[derive(Debug, Clone)]
pub struct JSErrorData {
    pub kind: JSErrorKind,
    pub file: String,
    pub line: usize,
    pub method: String,
}

#[derive(thiserror::Error, Debug, Clone)]
#[error("{}", .inner.kind)]
pub struct JSError {
    pub inner: Box<JSErrorData>,
}

impl JSError {
    pub fn new(kind: JSErrorKind, file: &str, line: usize, method: &str) -> Self {
        JSError {
            inner: Box::new(JSErrorData {
                kind,
                file: file.to_string(),
                line,
                method: method.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> &JSErrorKind {
        &self.inner.kind
    }

    /// Name of the native error constructor this error corresponds to.
    pub fn name(&self) -> &'static str {
        match self.kind() {
            JSErrorKind::SyntaxError { .. } => "SyntaxError",
            JSErrorKind::TypeError { .. } => "TypeError",
            JSErrorKind::RangeError { .. } => "RangeError",
            JSErrorKind::ReferenceError { .. } => "ReferenceError",
            JSErrorKind::Throw(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self.kind() {
            JSErrorKind::SyntaxError { message }
            | JSErrorKind::TypeError { message }
            | JSErrorKind::RangeError { message }
            | JSErrorKind::ReferenceError { message } => message.clone(),
            JSErrorKind::Throw(msg) => msg.clone(),
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self.kind(), JSErrorKind::SyntaxError { .. })
    }

    /// Where in the engine the error was raised, as `method file:line`.
    pub fn origin(&self) -> String {
        format!("{} {}:{}", self.inner.method, self.inner.file, self.inner.line)
    }
}

// Build a JSError of the given kind, recording the invocation site.
#[macro_export]
macro_rules! make_js_error {
    ($kind:expr) => {
        $crate::JSError::new($kind, file!(), line!() as usize, $crate::function_name!())
    };
}

#[macro_export]
macro_rules! raise_syntax_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::SyntaxError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_type_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::TypeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_range_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::RangeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // remove the trailing "::f"
        &name[..name.len() - 3]
    }};
}
