pub mod domain;
pub mod fragment;
