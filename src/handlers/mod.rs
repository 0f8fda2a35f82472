pub mod health;
pub mod registros;
