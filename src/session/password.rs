use rand::Rng;
use ring::{constant_time, digest};

const SALT_LEN: usize = 16;

/// Hash a password as `salt$sha256(salt || password)`, both parts hex encoded.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
    format!("{}${}", hex::encode(salt), hex::encode(salted_digest(&salt, password)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };

    let actual = salted_digest(&salt, password);
    constant_time::verify_slices_are_equal(&actual, &expected).is_ok()
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut ctx = digest::Context::new(&digest::SHA256);
    ctx.update(salt);
    ctx.update(password.as_bytes());
    ctx.finish().as_ref().to_vec()
}
