pub mod application {
    pub mod suggestion {
        pub mod generate;
    }
}

pub mod domain {
    pub mod clock;
    pub mod logger;
    pub mod scheduling;
    pub mod suggestion {
        pub mod cache;
        pub mod errors;
        pub mod fallback;
        pub mod fingerprint;
        pub mod metrics;
        pub mod model;
        pub mod parser;
        pub mod prompt;
        pub mod rate_limiter;
        pub mod retry_queue;
        pub mod services;
        pub mod settings;
        pub mod tasks;
        pub mod value_objects;
        pub mod use_cases {
            pub mod generate;
        }
    }
}
