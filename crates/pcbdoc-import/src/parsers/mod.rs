pub mod altium;
