//! Error types for the tools module.

use thiserror::Error;

/// Errors raised while registering or calling tools.
///
/// # Example
///
/// ```
/// use lrk::tools::ToolError;
///
/// let error = ToolError::not_found("unknown_tool");
/// assert!(error.to_string().contains("unknown_tool"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
	/// The requested tool is not registered.
	#[error("tool not found: {name}")]
	NotFound {
		/// Name of the missing tool.
		name: String,
	},

	/// A tool with the same name is already registered.
	#[error("tool already registered: {name}")]
	DuplicateName {
		/// Name of the duplicate tool.
		name: String,
	},

	/// The arguments passed to the tool were invalid.
	#[error("invalid arguments for {name}: {message}")]
	InvalidArguments {
		/// Name of the tool.
		name: String,
		/// Description of the validation failure.
		message: String,
	},

	/// The tool ran and failed.
	#[error("execution failed for {name}: {message}")]
	ExecutionFailed {
		/// Name of the tool.
		name: String,
		/// Description of the failure.
		message: String,
	},
}

impl ToolError {
	/// Create a NotFound error.
	pub fn not_found(name: impl Into<String>) -> Self {
		Self::NotFound { name: name.into() }
	}

	/// Create a DuplicateName error.
	pub fn duplicate_name(name: impl Into<String>) -> Self {
		Self::DuplicateName { name: name.into() }
	}

	/// Create an InvalidArguments error.
	pub fn invalid_arguments(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidArguments {
			name: name.into(),
			message: message.into(),
		}
	}

	/// Create an ExecutionFailed error.
	pub fn execution_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::ExecutionFailed {
			name: name.into(),
			message: message.into(),
		}
	}
}
