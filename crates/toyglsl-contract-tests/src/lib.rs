#![forbid(unsafe_code)]


mod determinism;
