pub mod yandex_gpt_service;
