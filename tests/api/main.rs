// one binary for all integration tests; each file is a group of endpoints
mod health_check;
mod helpers;
mod properties;
mod subscribe;
