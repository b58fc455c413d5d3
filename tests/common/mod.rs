#![allow(dead_code, unused_imports)]

pub use pipevisor_test_utils::builders;
pub use pipevisor_test_utils::fake_backend;
pub use pipevisor_test_utils::{
    collect_until_close, data_on, init_tracing, next_emission, with_timeout,
};
