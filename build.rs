extern crate capnpc;

fn main() {
    ::capnpc::CompilerCommand::new().src_prefix("capnp").file("capnp/lamina.capnp").run().unwrap();
}
