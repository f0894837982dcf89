pub mod collaborators;
pub mod configuration;
pub mod coordinator;
pub mod domain;
pub mod mailchimp_client;
pub mod routes;
pub mod schema_cache;
pub mod startup;
pub mod telemetry;
pub mod utils;
pub mod widget;
