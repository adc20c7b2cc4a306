pub mod test_device;
