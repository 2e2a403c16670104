//! Test suite for taskchat
//!
//! This module organizes all tests

pub mod integration;
