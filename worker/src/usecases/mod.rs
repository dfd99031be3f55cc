pub mod subscription_sweep;
