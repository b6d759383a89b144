//! Two-phase reel publishing: create a media container from a public video
//! URL, then poll the publish endpoint with a bounded number of attempts.

mod graph;
mod machine;

pub use graph::{GraphClient, PublishError, DEFAULT_API_VERSION, GRAPH_API_BASE_URL};
pub use machine::{
    Delay, GraphMediaApi, MediaApi, PublishJob, PublishOutcome, PublishState, Publisher,
    RetryPolicy, TokioDelay, DEFAULT_ATTEMPT_DELAY, DEFAULT_MAX_ATTEMPTS,
};
