pub mod aws_cli;
pub mod codebase;
