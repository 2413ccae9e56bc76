/// Building blocks for tests of interfaces and routers: packet generators and a step by step
/// interface harness.
pub mod test;
