mod helpers;
mod operations;
mod ordering;
