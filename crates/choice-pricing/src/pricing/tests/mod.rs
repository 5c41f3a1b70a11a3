mod common;
mod resolver;
mod validation;
