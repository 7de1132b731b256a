pub mod commissionmodel;
pub mod distributormodel;
pub mod usermodel;
pub mod withdrawalmodel;
