//! Typed async client for the user service HTTP API.

pub mod client;

pub use client::{RegisterRequest, SdkError, UpdateRequest, User, UsersClient};
