//! Integration tests for md5-model

mod animation;
mod common;
mod loading;
mod rendering;
mod scenario;
