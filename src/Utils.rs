//! different utility modules used throughout the project
/// logger initialisation: terminal and optional timestamped file
pub mod logger;
/// parse document with structure like "title1 \n key1: value1, value2 \n key2: value3 \n title2 \n key3: value4" into HashMap
pub mod task_parser;
