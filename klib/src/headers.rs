use rand::Rng;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:93.0) Gecko/20100101 Firefox/93.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_5_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.36",
];

const ACCEPTS: &[&str] = &[
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    "*/*",
];

const ACCEPT_ENCODINGS: &[&str] = &["gzip, deflate, br", "gzip, deflate", "identity"];

const ACCEPT_LANGUAGES: &[&str] = &["en-US,en;q=0.5", "en-US;q=0.8,en;q=0.7", "en;q=0.8"];

const CONNECTIONS: &[&str] = &["keep-alive", "close"];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://www.yahoo.com/",
    "https://www.duckduckgo.com/",
];

/// One set of browser-looking request headers, each field drawn independently
/// from a small fixed pool so consecutive requests don't share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_encoding: &'static str,
    pub accept_language: &'static str,
    pub connection: &'static str,
    pub referer: &'static str,
}

impl RequestHeaders {
    pub fn random() -> Self {
        // thread-local generator, seeded once per thread from the OS
        let mut rng = rand::thread_rng();

        Self {
            user_agent: pick(&mut rng, USER_AGENTS),
            accept: pick(&mut rng, ACCEPTS),
            accept_encoding: pick(&mut rng, ACCEPT_ENCODINGS),
            accept_language: pick(&mut rng, ACCEPT_LANGUAGES),
            connection: pick(&mut rng, CONNECTIONS),
            referer: pick(&mut rng, REFERERS),
        }
    }
}

fn pick<R: Rng>(rng: &mut R, pool: &'static [&'static str]) -> &'static str {
    pool[rng.gen_range(0..pool.len())]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn draws_stay_inside_the_pools() {
        for _ in 0..100 {
            let headers = RequestHeaders::random();

            assert!(USER_AGENTS.contains(&headers.user_agent));
            assert!(ACCEPTS.contains(&headers.accept));
            assert!(ACCEPT_ENCODINGS.contains(&headers.accept_encoding));
            assert!(ACCEPT_LANGUAGES.contains(&headers.accept_language));
            assert!(CONNECTIONS.contains(&headers.connection));
            assert!(REFERERS.contains(&headers.referer));
        }
    }

    #[test]
    fn draws_vary_across_calls() {
        let first = RequestHeaders::random();
        let varied = (0..200).any(|_| RequestHeaders::random() != first);

        assert!(varied, "200 consecutive draws produced identical headers");
    }
}
