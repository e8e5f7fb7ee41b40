// src/core/commands/hash/mod.rs

pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hincrby;
pub mod hincrbyfloat;
pub mod hkeys;
pub mod hlen;
pub mod hmget;
pub mod hrandfield;
pub mod hset;
pub mod hsetnx;
pub mod hstrlen;
pub mod hvals;

pub use self::hdel::HDel;
pub use self::hexists::HExists;
pub use self::hget::HGet;
pub use self::hgetall::HGetAll;
pub use self::hincrby::HIncrBy;
pub use self::hincrbyfloat::HIncrByFloat;
pub use self::hkeys::HKeys;
pub use self::hlen::HLen;
pub use self::hmget::HmGet;
pub use self::hrandfield::HRandField;
pub use self::hset::HSet;
pub use self::hsetnx::HSetNx;
pub use self::hstrlen::HStrLen;
pub use self::hvals::HVals;
