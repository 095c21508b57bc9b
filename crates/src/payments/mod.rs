pub mod apple;
