//! Testing utilities for CivicWatch
//!
//! Shared test support used across the workspace:
//! - Fluent builders that drive the real domain workflow
//! - Fixtures with fake-generated text and deterministic geography
//! - Mocks for the delivery-side ports
//!
//! # Examples
//!
//! ```
//! use civicwatch_testing::{builders::*, fixtures::*};
//! use civicwatch_domain::issue::IssueStatus;
//!
//! let issue = IssueBuilder::new()
//!     .with_title("Flickering streetlight")
//!     .assigned_to(create_test_authority().id)
//!     .build();
//!
//! assert_eq!(issue.status, IssueStatus::Assigned);
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use fake;
