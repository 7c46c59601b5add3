mod attributes;
mod query;
