//! QuickSight account subscription control-plane client
//!
//! Typed inputs and outputs for the three account subscription calls, a
//! dyn-compatible `QuickSightApi` trait, and a SigV4-signed reqwest
//! implementation of it. The resource handler only sees the trait, so it
//! can be driven by scripted fakes in tests.

pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod sigv4;
pub mod types;

pub use client::{ApiFuture, HttpClient, QuickSightApi};
pub use constants::*;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use types::{
    AccountInfo, AuthenticationMethodOption, CreateAccountSubscriptionInput,
    CreateAccountSubscriptionOutput, DeleteAccountSubscriptionInput,
    DeleteAccountSubscriptionOutput, DescribeAccountSubscriptionInput,
    DescribeAccountSubscriptionOutput, Edition, SignupResponse, UnknownVariant,
};
