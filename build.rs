fn main() {
  // Configure rpath so a bundled binary can locate Oracle libraries
  // placed next to it, e.g. <prefix>/bin/oracle-node and
  // <prefix>/lib/instantclient/libclntsh.dylib
  #[cfg(target_os = "macos")]
  {
    println!("cargo:rustc-link-arg-bins=-Wl,-rpath,@executable_path/../lib/instantclient");
  }

  #[cfg(target_os = "linux")]
  {
    println!("cargo:rustc-link-arg-bins=-Wl,-rpath,$ORIGIN/../lib/instantclient");
  }

  println!("cargo:rerun-if-changed=build.rs");
}
