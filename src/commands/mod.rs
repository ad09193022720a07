pub mod annotate;
pub mod check_tools;
