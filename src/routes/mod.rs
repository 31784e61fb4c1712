pub(crate) mod analysis;
pub(crate) mod companies;
pub(crate) mod dashboard;
pub(crate) mod health;
