mod cascade;
mod common;
mod matching;
