//! HTTP request handlers.

pub(crate) mod feed;
pub(crate) mod home;
