pub mod invoicedtos;
pub mod messagedtos;
pub mod propertydtos;
pub mod roledtos;
pub mod userdtos;
pub mod utilitydtos;
