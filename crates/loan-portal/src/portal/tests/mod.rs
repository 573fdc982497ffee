mod common;
mod service;
mod views;
