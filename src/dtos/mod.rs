pub mod commissiondtos;
pub mod commondtos;
pub mod distributiondtos;
pub mod withdrawaldtos;
