//! # IO Module
//!
//! Interface layer exposing the domain over HTTP. All endpoints live in
//! [`rest`].

pub mod rest;
