pub mod action_executor;
pub mod command;
pub mod config;
pub mod discovery;
pub mod interpreter;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod recency_store;
pub mod runtime;
pub mod search;
pub mod source_cache;

#[cfg(test)]
extern crate self as termlaunch_core;

#[cfg(test)]
mod tests {
    mod query_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/query_latency_test.rs"
        ));
    }
}
