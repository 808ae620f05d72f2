//! HTTP integration tests against the in-memory store.

mod support;

mod health;
mod orders;
mod products;
mod tracking;
mod users;
