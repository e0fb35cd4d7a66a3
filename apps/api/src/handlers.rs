pub mod audit;
pub mod geography;
pub mod health;
pub mod images;
pub mod public;
pub mod qr;
pub mod specimens;
pub mod taxonomy;
pub mod users;
