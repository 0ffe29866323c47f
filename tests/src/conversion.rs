mod integration;
mod naming;
