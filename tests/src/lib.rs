mod conversion;
mod utils;
