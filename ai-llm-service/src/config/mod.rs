pub mod yandex_gpt_config;
